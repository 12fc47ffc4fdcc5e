/// Router Module Index
///
/// Routes are grouped by the minimum trust level they need. The grouping only
/// decides whether a bearer token must be present; each handler still asks the
/// policy engine about its specific action.

/// Routes open to anonymous callers: account creation, login and listings.
pub mod public;

/// Routes that need a verified identity (commenting).
pub mod authenticated;

/// Routes whose actions are reserved to administrators (post management).
pub mod admin;
