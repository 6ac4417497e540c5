use console::Style;
use flume::Receiver;

use crate::asserter::ContractOutcome;

pub struct OutPutter;

/// Outcomes of a whole run, in the order the contracts were checked.
#[derive(Debug, Default)]
pub struct Summary {
    pub outcomes: Vec<ContractOutcome>,
}

impl Summary {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&ContractOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

impl OutPutter {
    pub async fn start(
        rx: Receiver<ContractOutcome>,
        target: &str,
        n_contracts: usize,
    ) -> Summary {
        let style = Style::new().bold().cyan();
        let open_text =
            format!("Checking {target}: found {n_contracts} contracts, running...");

        println!("{}", style.apply_to(open_text));

        let mut summary = Summary::default();
        let mut i = 1;

        while let Ok(outcome) = rx.recv_async().await {
            let name = &outcome.name;
            let method = &outcome.method;
            let path = &outcome.path;

            if outcome.passed() {
                println!(
                    "[{i}/{n_contracts}] {}  {method} {path} {name} {}",
                    console::style("✔").green().bold(),
                    console::style("PASS!").green().bold(),
                );
            } else {
                for failure in outcome.failures() {
                    println!(
                        "[{i}/{n_contracts}] {}  {method} {path} {name}: {} {}",
                        console::style("╳").red().bold(),
                        failure.expected,
                        console::style("FAILED!").red().bold(),
                    );
                }
            }

            summary.outcomes.push(outcome);
            i += 1;
        }

        println!();

        if summary.is_success() {
            println!(
                "{}",
                console::style(format!("All {} contracts passed!", summary.passed()))
                    .bold()
                    .green()
            );
            return summary;
        }

        println!(
            "{}",
            console::style("Summary of Failed Contracts:").bold().red()
        );

        let failed = summary
            .outcomes
            .iter()
            .flat_map(|o| o.failures().map(move |f| (o, f)));

        for (idx, (outcome, result)) in failed.enumerate() {
            println!(
                "\n{}. {} {} {}\n{}",
                idx + 1,
                outcome.method,
                outcome.path,
                outcome.name,
                result
            );
        }

        println!(
            "\n{}",
            console::style(format!(
                "{} passed, {} failed",
                summary.passed(),
                summary.failed()
            ))
            .bold()
        );

        summary
    }
}
