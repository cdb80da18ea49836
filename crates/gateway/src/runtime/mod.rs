pub mod session_table;
