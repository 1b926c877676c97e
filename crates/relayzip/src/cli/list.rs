use anyhow::Result;
use clap::Args;
use relayzip::Settings;

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Also show where each source would be written.
    #[arg(long, short)]
    pub long: bool,
}

pub fn list(settings: &Settings, args: &ListArgs) -> Result<()> {
    for (selector, source) in &settings.sources {
        if args.long {
            let target = settings
                .sink_path(selector, source)
                .unwrap_or_else(|e| format!("<{e}>"));
            println!("{selector}\t{}\t{}\t{target}", source.page, source.pattern);
        } else {
            println!("{selector}\t{}", source.page);
        }
    }
    Ok(())
}
