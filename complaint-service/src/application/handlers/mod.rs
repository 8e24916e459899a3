mod command_handler;
mod query_handler;

pub use command_handler::ComplaintCommandHandler;
pub use query_handler::ComplaintQueryHandler;
