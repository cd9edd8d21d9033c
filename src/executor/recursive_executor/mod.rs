mod recursive_executor;
mod redirect;

pub use recursive_executor::RecursiveExecutor;
