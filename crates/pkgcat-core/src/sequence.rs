//! Request sequencing
//!
//! Each component hands out a [`Ticket`] when it starts a request and only
//! applies the completion whose ticket is still the latest one. Anything
//! older is a superseded response and is dropped.

/// Monotonic request sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    /// Drop whatever is in flight without starting anything new
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}
