use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const EMPLOYERS: u32 = 5;
pub const WORKERS: u32 = 10;
pub const ADMIN: u32 = 99;

/// How a generated job ends up after the log is replayed.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub posted: usize,
    pub assigned: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

/// Writes a command log with `jobs` jobs driven to random, valid end states.
/// The same seed always produces the same log.
pub fn generate_marketplace_csv(path: &Path, jobs: u32, seed: u64) -> Result<Outcome, Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut outcome = Outcome::default();

    wtr.write_record(["type", "actor", "job", "target", "min", "max", "rating", "tip", "note"])?;
    for id in 1..=EMPLOYERS {
        wtr.write_record(["employer", &id.to_string(), "", "", "", "", "", "", "Employer"])?;
    }
    for id in 1..=WORKERS {
        let id = 100 + id;
        wtr.write_record(["worker", &id.to_string(), "", "", "", "", "", "", "Worker"])?;
    }
    wtr.write_record(["admin", &ADMIN.to_string(), "", "", "", "", "", "", "Ops"])?;

    for job in 1..=jobs {
        let job_id = (1000 + job).to_string();
        let employer = rng.gen_range(1..=EMPLOYERS).to_string();
        let worker = (100 + rng.gen_range(1..=WORKERS)).to_string();
        let min = rng.gen_range(50..=500u32);
        let max = min + rng.gen_range(0..=500u32);

        wtr.write_record([
            "post", &employer, &job_id, "", &min.to_string(), &max.to_string(), "", "", "Job",
        ])?;

        // 0: stays posted, 1: assigned, 2: in progress, 3: completed, 4: cancelled
        match rng.gen_range(0..5u8) {
            0 => outcome.posted += 1,
            stage => {
                wtr.write_record(["assign", &employer, &job_id, &worker, "", "", "", "", ""])?;
                if stage >= 2 && stage != 4 {
                    wtr.write_record(["start", &worker, &job_id, "", "", "", "", "", ""])?;
                }
                match stage {
                    1 => outcome.assigned += 1,
                    2 => outcome.in_progress += 1,
                    3 => {
                        let rating = rng.gen_range(1..=5u8).to_string();
                        let tip = rng.gen_range(0..=100u32).to_string();
                        wtr.write_record(["done", &worker, &job_id, "", "", "", "", "", ""])?;
                        wtr.write_record([
                            "approve", &employer, &job_id, "", "", "", &rating, &tip, "Thanks",
                        ])?;
                        wtr.write_record(["confirm", &employer, &job_id, "", "", "", "", "", ""])?;
                        outcome.completed += 1;
                    }
                    _ => {
                        wtr.write_record([
                            "cancel", &employer, &job_id, "", "", "", "", "", "Changed plans",
                        ])?;
                        outcome.cancelled += 1;
                    }
                }
            }
        }
    }

    wtr.flush()?;
    Ok(outcome)
}
