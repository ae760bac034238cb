mod helpers;

mod evaluator_properties;
mod occurrence_day;
mod propagation;
mod rule_cases;
mod seed_job;
mod wall_clock;
