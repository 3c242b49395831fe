pub mod task_store;

#[cfg(test)]
mod task_store_test;
