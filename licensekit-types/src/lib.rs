//! Core type definitions shared by the licensekit crates.
//!
//! Both the issuer and the revocation store speak in terms of [`LicenseId`],
//! so the identifier format lives here rather than in either component.

mod ids;

pub use ids::{InvalidLicenseId, LicenseId, MAX_LICENSE_ID_LEN};
