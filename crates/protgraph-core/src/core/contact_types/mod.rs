//! # Contact Types Module
//!
//! A contact type is a rule selecting which atoms of each residue take part in
//! distance computation: C-alpha only, C-beta only, backbone, side chain, all
//! atoms, and so on.
//!
//! ## Key Components
//!
//! - [`registry`] - The immutable contact-type dictionary, loaded from TOML
//! - [`selector`] - Parsing of contact-type strings such as `"BB+SC"` or `"BB/SC"`
//!
//! ## Selector syntax
//!
//! - `X` selects the atoms of type `X` on both ends of a contact (undirected).
//! - `X/Y` is a crossed type: the first endpoint uses `X`, the second `Y`, and the
//!   resulting graphs are directed.
//! - `A+B` unions the graphs of `A` and `B`.
//!
//! ```ignore
//! use protgraph::core::contact_types::registry::ContactTypeRegistry;
//! use protgraph::core::contact_types::selector::ContactSelector;
//!
//! let registry = ContactTypeRegistry::standard()?;
//! let selector = ContactSelector::parse(&registry, "BB/SC")?;
//! assert!(selector.is_crossed());
//! ```

pub mod registry;
pub mod selector;
