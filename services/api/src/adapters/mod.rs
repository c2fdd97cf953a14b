pub mod db;
pub mod media;
pub mod payments;

pub use db::PgStore;
pub use media::S3MediaStore;
pub use payments::StripeGateway;
