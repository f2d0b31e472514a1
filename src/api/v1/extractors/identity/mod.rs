/*!
 * Request-scoped identity
 *
 * Responsibility:
 * - The typed identity carrier (IdentityContext) placed in request extensions by the gate
 * - The extractor handlers use to read it (Identity)
 */

mod core;
mod types;

pub use core::Identity;
pub use types::IdentityContext;
