use serde::{Deserialize, Serialize};

/// Lifecycle of a reservation hold.
///
/// A hold is created in `Held` and resolves exactly once, to either
/// `Confirmed` (stock permanently deducted) or `Released` (stock
/// returned to the available pool). Both terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldState {
    /// Stock is set aside for an order but not yet committed.
    Held,
    /// The hold was converted into a permanent deduction.
    Confirmed,
    /// The hold was cancelled and the stock returned.
    Released,
}

impl HoldState {
    /// A hold can only be confirmed while it is active.
    pub fn can_confirm(&self) -> bool {
        matches!(self, HoldState::Held)
    }

    /// A hold can only be released while it is active.
    pub fn can_release(&self) -> bool {
        matches!(self, HoldState::Held)
    }

    /// Returns true once the hold has resolved.
    pub fn is_terminal(&self) -> bool {
        matches!(self, HoldState::Confirmed | HoldState::Released)
    }
}

impl std::fmt::Display for HoldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HoldState::Held => "held",
            HoldState::Confirmed => "confirmed",
            HoldState::Released => "released",
        };
        write!(f, "{s}")
    }
}

/// A per-order reservation against one product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    /// Quantity set aside by this hold.
    pub quantity: u32,

    /// Current lifecycle state.
    pub state: HoldState,
}

impl Hold {
    /// Creates a new active hold.
    pub fn new(quantity: u32) -> Self {
        Self {
            quantity,
            state: HoldState::Held,
        }
    }

    /// Returns true while the hold still counts against reserved stock.
    pub fn is_active(&self) -> bool {
        self.state == HoldState::Held
    }
}
