pub mod link;
pub mod visit;

pub use link::{CreateLinkRequest, CreateLinkResponse, LinkRecord};
pub use visit::{BeaconRequest, BeaconResponse, VisitRecord, VisitSource};
