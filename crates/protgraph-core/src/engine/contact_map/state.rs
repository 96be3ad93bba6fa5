/// The state of one contact-map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContactState {
    Contact,
    #[default]
    NonContact,
    /// One or both residues are unobserved or non-standard. Such cells never hold
    /// a contact and are left out of every count and comparison.
    Skipped,
}

impl ContactState {
    pub fn is_contact(self) -> bool {
        match self {
            ContactState::Contact => true,
            ContactState::NonContact | ContactState::Skipped => false,
        }
    }

    pub fn is_skipped(self) -> bool {
        matches!(self, ContactState::Skipped)
    }
}
