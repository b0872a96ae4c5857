// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, capability checks per handler)
pub mod protected; // /api/* except login
pub mod public; // /, /health, /api/login
