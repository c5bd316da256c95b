use metrics::counter;

pub fn record_inbound(channel: &str, activity_type: &str) {
    counter!(
        "bb_inbound_activities_total",
        "channel" => channel.to_string(),
        "type" => activity_type.to_string()
    )
    .increment(1);
}

pub fn record_outbound(channel: &str, outcome: Outcome) {
    counter!(
        "bb_outbound_activities_total",
        "channel" => channel.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_storage_op(provider: &'static str, op: &'static str, outcome: Outcome) {
    counter!(
        "bb_storage_ops_total",
        "provider" => provider,
        "op" => op,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_nlp_call(engine: &'static str, op: &'static str, outcome: Outcome) {
    counter!(
        "bb_nlp_calls_total",
        "engine" => engine,
        "op" => op,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Skipped,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Skipped => "skipped",
            Outcome::Error => "error",
        }
    }

    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Outcome::Ok
        } else {
            Outcome::Error
        }
    }
}
