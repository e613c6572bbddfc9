pub mod prepare_env;
