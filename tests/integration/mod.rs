//! End-to-end tests driving the `mp` binary against temporary git repositories

mod helpers;
mod test_build;
mod test_package;
mod test_validate;
