//! Export of DataHub project collections from iRODS to research-data repositories.

pub use logging::init_logging;

pub mod bundle;
pub mod dataverse;
pub mod export;
pub mod irods;
pub mod logging;
pub mod mailer;
pub mod mapper;
pub mod metadata;
pub mod status;

mod testing;
