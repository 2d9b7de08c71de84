mod list;

pub use list::list_orders;
