pub mod pconline_client;
