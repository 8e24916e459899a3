pub mod memory;
pub mod postgres;

pub use memory::InMemoryComplaintRepository;
pub use postgres::PostgresComplaintRepository;
