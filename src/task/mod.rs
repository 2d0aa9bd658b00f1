pub mod encoder;
pub mod maze_run;
pub mod orchestrate;
pub mod rc_control;
