mod common;

mod attempt_tests;
