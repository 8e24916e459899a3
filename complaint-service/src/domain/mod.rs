pub mod model;
pub mod repository;
pub mod service;

pub use model::{Complaint, ComplaintId, ComplaintSubmission, NewComplaint, UNKNOWN_COUNTRY};
pub use repository::{
    ComplaintRepository, ComplaintRepositoryRef, GeolocationResolver, GeolocationResolverRef,
    RepositoryError,
};
pub use service::ComplaintDomainService;
