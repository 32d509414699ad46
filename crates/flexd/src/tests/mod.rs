//! Behavioural suites for the Flex service runtime.

mod process_behaviour;
mod support;
