pub mod row_queue;
pub mod security;
