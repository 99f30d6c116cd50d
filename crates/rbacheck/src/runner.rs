//! Probe runner: evaluates compiled probes and collects discrepancies.

use tracing::{debug, warn};

use crate::model::{CompiledProbe, Discrepancy, Identity, ProbeResult, Verdict};
use crate::oracle::ClusterOracle;

/// Receives progress as a run happens, for the operator's transcript.
pub trait ProbeObserver {
    fn identity_started(&mut self, _identity: &Identity) {}

    fn probe_finished(&mut self, _result: &ProbeResult) {}
}

impl ProbeObserver for () {}

/// Collects every result; handy for tests and for post-run rendering.
impl ProbeObserver for Vec<ProbeResult> {
    fn probe_finished(&mut self, result: &ProbeResult) {
        self.push(result.clone());
    }
}

/// Runs `probes` in order and returns the ones whose answer differed.
///
/// A failed oracle call counts as an empty answer, which never matches, so it
/// becomes a discrepancy rather than ending the run.
pub fn run<O: ClusterOracle + ?Sized>(
    oracle: &O,
    probes: Vec<CompiledProbe>,
    observer: &mut dyn ProbeObserver,
) -> Vec<Discrepancy> {
    let mut discrepancies = Vec::new();

    for probe in probes {
        let actual = match oracle.check_permission(&probe) {
            Ok(answer) => answer.trim_end().to_string(),
            Err(e) => {
                warn!(command = %probe, error = %e, "Permission check failed");
                String::new()
            }
        };

        let verdict = if actual == probe.expected().as_str() {
            Verdict::Success
        } else {
            Verdict::Failure
        };
        debug!(
            command = %probe,
            %actual,
            expected = %probe.expected(),
            %verdict,
            "Probe evaluated"
        );

        let result = ProbeResult {
            probe,
            actual,
            verdict,
        };
        observer.probe_finished(&result);

        if verdict == Verdict::Failure {
            discrepancies.push(Discrepancy {
                probe: result.probe,
                actual: result.actual,
            });
        }
    }

    discrepancies
}
