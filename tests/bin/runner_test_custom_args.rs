use clap::Args;
use epinet::runner::run_with_custom_args;

#[derive(Args, Debug)]
struct Extra {
    /// Overrides the scenario's contact reduction
    #[arg(long)]
    contact_reduction: f64,
}

fn main() {
    run_with_custom_args(|scenario, _args, extra: Option<Extra>| {
        if let Some(extra) = extra {
            scenario.parameters.contact_reduction = extra.contact_reduction;
            scenario.parameters.validate()?;
        }
        Ok(())
    })
    .unwrap();
}
