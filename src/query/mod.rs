pub mod employment_status;
pub mod list;

pub use employment_status::{
    aggregate, one_year_threshold, EmploymentStatusFilter, EmploymentStatusQuery, EmploymentStatusView,
    StatusPagination,
};
pub use list::{Entity, ListMeta, ListParams, ListQuery, ListSpec, Paginated};
