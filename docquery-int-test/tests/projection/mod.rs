mod cast_test;
mod projection_test;
