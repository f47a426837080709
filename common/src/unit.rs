//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity deletion.
#[derive(Clone, Copy, Debug)]
pub struct Deletion;

/// Marker type describing an issuance of something (a token, for example).
#[derive(Clone, Copy, Debug)]
pub struct Issuance;

/// Marker type describing an expiration of something.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Marker type describing a revocation of something.
#[derive(Clone, Copy, Debug)]
pub struct Revocation;
