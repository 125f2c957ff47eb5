/*
 * This module provides the application logic layer, centered around
 * `MyAppLogic`, which acts as the Presenter/Controller between the console
 * front end and the catalog session. Unit tests for `MyAppLogic` are in
 * `handler_tests.rs`.
 */
pub mod handler;


pub use handler::MyAppLogic;
