pub mod checkout_reader;
pub mod order_writer;
