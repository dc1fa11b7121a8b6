pub mod class_tests;
