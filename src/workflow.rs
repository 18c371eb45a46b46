use anyhow::Result;
use rand::Rng;
use std::path::Path;

use crate::console;
use crate::ledger::{Category, Ledger, LedgerStore};
use crate::media;
use crate::select;

/// How many files the top-up loop tries to keep in progress.
pub const DEFAULT_TARGET: usize = 3;

/// Action on a freshly proposed candidate (a name still in `unused`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateAction {
    Confirm,
    Ignore,
    BRoll,
}

/// Action on an item already in `inprogress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    Done,
    Ignore,
    Return,
    BRoll,
}

/// Apply a candidate action and return the destination category.
pub fn apply_candidate(ledger: &mut Ledger, name: &str, action: CandidateAction) -> Category {
    let to = match action {
        CandidateAction::Confirm => Category::InProgress,
        CandidateAction::Ignore => Category::Ignore,
        CandidateAction::BRoll => Category::BRoll,
    };
    ledger.move_file(name, Category::Unused, to);
    to
}

/// Apply an in-progress action and return the destination category.
pub fn apply_item(ledger: &mut Ledger, name: &str, action: ItemAction) -> Category {
    let to = match action {
        ItemAction::Done => Category::Used,
        ItemAction::Ignore => Category::Ignore,
        ItemAction::Return => Category::Unused,
        ItemAction::BRoll => Category::BRoll,
    };
    ledger.move_file(name, Category::InProgress, to);
    to
}

/// Draw one prefix-filtered random name out of `unused` into `inprogress`.
/// `None` when nothing in `unused` matches.
pub fn draw_replacement<R: Rng>(ledger: &mut Ledger, prefix: &str, rng: &mut R) -> Option<String> {
    let name = select::choose_by_prefix(&ledger.unused, prefix, rng)?.to_string();
    ledger.move_file(&name, Category::Unused, Category::InProgress);
    Some(name)
}

/// Whether the run should keep going after the management loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Interactive shell around the pure transitions. Holds the run context and
/// persists through `store` after every mutation.
pub struct Workflow<'a> {
    pub store: &'a LedgerStore,
    pub source_dir: &'a Path,
    pub working_dir: Option<&'a Path>,
    pub target: usize,
}

impl Workflow<'_> {
    /// Review loop over files already marked in progress. Returns
    /// `Flow::Exit` when the user asked to end the whole run.
    pub fn manage_inprogress(&self, ledger: &mut Ledger) -> Result<Flow> {
        println!("\nFiles are currently marked as in progress.");
        loop {
            if ledger.inprogress.is_empty() {
                println!("No files remain in progress.");
                return Ok(Flow::Continue);
            }

            println!();
            for (idx, name) in ledger.inprogress.iter().enumerate() {
                println!("  [{}] {}", idx + 1, name);
            }

            let input =
                console::prompt("Select a file by number, 'c' to continue, or 'x' to exit: ")?;
            match input.as_str() {
                "c" => return Ok(Flow::Continue),
                "x" => {
                    println!("Leaving lists unchanged and exiting.");
                    return Ok(Flow::Exit);
                }
                other => {
                    let Ok(idx) = other.parse::<usize>() else {
                        println!("Unrecognized input. Please try again.");
                        continue;
                    };
                    if idx == 0 || idx > ledger.inprogress.len() {
                        println!("No file numbered {idx}.");
                        continue;
                    }
                    let name = ledger.inprogress[idx - 1].clone();
                    self.review_item(ledger, &name)?;
                }
            }
        }
    }

    fn review_item(&self, ledger: &mut Ledger, name: &str) -> Result<()> {
        loop {
            let input = console::prompt(&format!(
                "{name}: 'd' done, 'i' ignore, 'u' return to unused, 'b' mark b-roll, 'k' back: "
            ))?;
            let action = match input.as_str() {
                "d" => ItemAction::Done,
                "i" => ItemAction::Ignore,
                "u" => ItemAction::Return,
                "b" => ItemAction::BRoll,
                "k" => return Ok(()),
                _ => {
                    println!("Unrecognized input. Please try again.");
                    continue;
                }
            };

            let to = apply_item(ledger, name, action);
            self.store.save(ledger)?;
            println!("Moved '{name}' to '{}'.", to.label());

            // Freeing a slot invites a replacement draw.
            if matches!(action, ItemAction::Ignore | ItemAction::Return) {
                self.offer_replacement(ledger)?;
            }
            return Ok(());
        }
    }

    fn offer_replacement(&self, ledger: &mut Ledger) -> Result<()> {
        if !console::confirm("Draw a replacement from 'unused'?")? {
            return Ok(());
        }
        let prefix = ledger.last_prefix.clone().unwrap_or_default();
        match draw_replacement(ledger, &prefix, &mut rand::thread_rng()) {
            Some(name) => {
                self.store.save(ledger)?;
                println!("Added '{name}' to 'inprogress'.");
                self.offer_copy(&name)?;
            }
            None => println!("No candidates left in 'unused' with prefix '{prefix}'."),
        }
        Ok(())
    }

    fn offer_copy(&self, name: &str) -> Result<()> {
        let Some(working_dir) = self.working_dir else {
            return Ok(());
        };
        if !console::confirm(&format!("Copy '{name}' to {}?", working_dir.display()))? {
            return Ok(());
        }
        match media::stage(&self.source_dir.join(name), working_dir) {
            Ok(media::StageMethod::Remuxed) => println!("Remuxed '{name}' into the working directory."),
            Ok(media::StageMethod::Copied) => println!("Copied '{name}' into the working directory."),
            Ok(media::StageMethod::FallbackCopied) => {
                println!("Copied '{name}' into the working directory (remux fell back to a plain copy).")
            }
            Err(err) => println!("Could not stage '{name}': {err:#}"),
        }
        Ok(())
    }

    /// Fill `inprogress` up to the target with prefix-filtered random picks.
    ///
    /// `carried_over` marks a session that began with in-progress files and
    /// went through the review loop; the batch offer is only for fresh fills.
    pub fn top_up(&self, ledger: &mut Ledger, carried_over: bool) -> Result<()> {
        if ledger.inprogress.len() >= self.target {
            println!(
                "'inprogress' already holds {} file(s) (target {}).",
                ledger.inprogress.len(),
                self.target
            );
            return Ok(());
        }

        let prefix = ledger.last_prefix.clone().unwrap_or_default();

        let open_slots = self.target - ledger.inprogress.len();
        if !carried_over && open_slots > 1 && self.batch_top_up(ledger, &prefix, open_slots)? {
            return Ok(());
        }

        while ledger.inprogress.len() < self.target {
            let candidate = {
                let mut rng = rand::thread_rng();
                select::choose_by_prefix(&ledger.unused, &prefix, &mut rng).map(str::to_string)
            };
            let Some(candidate) = candidate else {
                println!("No files available in 'unused' with prefix '{prefix}'.");
                break;
            };
            if !self.propose(ledger, &candidate)? {
                break;
            }
        }
        Ok(())
    }

    /// Present one candidate until it is resolved. Returns false when the
    /// user stopped the top-up loop.
    fn propose(&self, ledger: &mut Ledger, candidate: &str) -> Result<bool> {
        println!(
            "\nProposed: {candidate}  ({} of {} in progress)",
            ledger.inprogress.len(),
            self.target
        );
        loop {
            let input = console::prompt(
                "'p' preview, 'c' confirm, 'i' ignore, 'b' mark b-roll, 's' stop: ",
            )?;
            let action = match input.as_str() {
                "p" => {
                    if let Err(err) = media::preview(self.source_dir, candidate) {
                        println!("Preview failed: {err:#}");
                    }
                    continue;
                }
                "c" => CandidateAction::Confirm,
                "i" => CandidateAction::Ignore,
                "b" => CandidateAction::BRoll,
                "s" => return Ok(false),
                _ => {
                    println!("Unrecognized input. Please try again.");
                    continue;
                }
            };

            let to = apply_candidate(ledger, candidate, action);
            self.store.save(ledger)?;
            println!("Moved '{candidate}' to '{}'.", to.label());

            if action == CandidateAction::Confirm {
                self.offer_copy(candidate)?;
            }
            return Ok(true);
        }
    }

    /// Offer to fill all open slots in one confirmed draw, re-rolling until
    /// the user likes the sample. Returns true when the slots were filled
    /// here; false hands control back to the one-at-a-time loop.
    fn batch_top_up(&self, ledger: &mut Ledger, prefix: &str, want: usize) -> Result<bool> {
        let available = ledger
            .unused
            .iter()
            .filter(|n| n.starts_with(prefix))
            .count();
        if available < want {
            println!("Only {available} candidate(s) match '{prefix}'; falling back to one at a time.");
            return Ok(false);
        }
        if !console::confirm(&format!(
            "Draw {want} file(s) at once instead of one at a time?"
        ))? {
            return Ok(false);
        }

        loop {
            let selected = {
                let mut rng = rand::thread_rng();
                select::sample_by_prefix(&ledger.unused, prefix, want, &mut rng)?
            };
            println!("Selected files:");
            for name in &selected {
                println!("  - {name}");
            }

            let input =
                console::prompt("'c' to confirm, Enter to draw again, 's' for one at a time: ")?;
            match input.as_str() {
                "c" => {
                    for name in &selected {
                        apply_candidate(ledger, name, CandidateAction::Confirm);
                    }
                    self.store.save(ledger)?;
                    println!("Moved {} file(s) to 'inprogress'.", selected.len());
                    for name in &selected {
                        self.offer_copy(name)?;
                    }
                    return Ok(true);
                }
                "" => continue,
                "s" => return Ok(false),
                _ => println!("Unrecognized input. Please try again."),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ledger_with_unused(names: &[&str]) -> Ledger {
        Ledger {
            unused: names.iter().map(|s| s.to_string()).collect(),
            ..Ledger::default()
        }
    }

    #[test]
    fn confirming_a_candidate_moves_it_into_inprogress() {
        let mut ledger = ledger_with_unused(&["x.mp4"]);

        let to = apply_candidate(&mut ledger, "x.mp4", CandidateAction::Confirm);

        assert_eq!(to, Category::InProgress);
        assert!(ledger.unused.is_empty());
        assert_eq!(ledger.inprogress, vec!["x.mp4"]);
    }

    #[test]
    fn candidate_actions_cover_ignore_and_b_roll() {
        let mut ledger = ledger_with_unused(&["a.mp4", "b.mp4"]);

        apply_candidate(&mut ledger, "a.mp4", CandidateAction::Ignore);
        apply_candidate(&mut ledger, "b.mp4", CandidateAction::BRoll);

        assert!(ledger.unused.is_empty());
        assert_eq!(ledger.ignore, vec!["a.mp4"]);
        assert_eq!(ledger.b_roll, vec!["b.mp4"]);
    }

    #[test]
    fn done_moves_an_item_from_inprogress_to_used() {
        let mut ledger = Ledger {
            inprogress: vec!["d.mp4".to_string()],
            ..Ledger::default()
        };

        let to = apply_item(&mut ledger, "d.mp4", ItemAction::Done);

        assert_eq!(to, Category::Used);
        assert!(ledger.inprogress.is_empty());
        assert_eq!(ledger.used, vec!["d.mp4"]);
    }

    #[test]
    fn returned_item_becomes_eligible_for_selection_again() {
        let mut ledger = Ledger {
            inprogress: vec!["r.mp4".to_string()],
            ..Ledger::default()
        };

        apply_item(&mut ledger, "r.mp4", ItemAction::Return);

        assert_eq!(ledger.unused, vec!["r.mp4"]);
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(
            select::choose_by_prefix(&ledger.unused, "", &mut rng),
            Some("r.mp4")
        );
    }

    #[test]
    fn replacement_draw_respects_prefix() {
        let mut ledger = ledger_with_unused(&["IMG_1.mp4", "VID_1.mp4"]);
        let mut rng = StdRng::seed_from_u64(10);

        let drawn = draw_replacement(&mut ledger, "VID_", &mut rng).expect("candidate exists");

        assert_eq!(drawn, "VID_1.mp4");
        assert_eq!(ledger.inprogress, vec!["VID_1.mp4"]);
        assert_eq!(ledger.unused, vec!["IMG_1.mp4"]);
    }

    #[test]
    fn exhausted_unused_yields_no_replacement_and_a_smaller_working_set() {
        let mut ledger = Ledger {
            inprogress: vec!["d.mp4".to_string(), "e.mp4".to_string()],
            ..Ledger::default()
        };
        let mut rng = StdRng::seed_from_u64(11);

        apply_item(&mut ledger, "d.mp4", ItemAction::Done);
        let drawn = draw_replacement(&mut ledger, "", &mut rng);

        assert_eq!(drawn, None);
        assert_eq!(ledger.inprogress, vec!["e.mp4"]);
        assert_eq!(ledger.used, vec!["d.mp4"]);
    }
}
