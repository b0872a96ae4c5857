pub mod alumnus;
pub mod employment;
pub mod role;

pub use alumnus::{Alumnus, AlumnusChanges, NewAlumnus};
pub use employment::{EmploymentInput, EmploymentRecord, EmploymentStatus};
pub use role::Role;
