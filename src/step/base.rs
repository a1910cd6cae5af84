/// Attributes every step kind shares.
#[derive(Debug, Clone)]
pub(crate) struct StepBase {
    label: &'static str,
    replicas: u16,
    input_capacity: Option<usize>,
}

impl StepBase {
    pub(crate) fn new(label: &'static str, replicas: u16, input_capacity: Option<usize>) -> Self {
        Self {
            label,
            // a step always has at least one worker
            replicas: replicas.max(1),
            // an explicit zero falls back to the pipeline default
            input_capacity: input_capacity.filter(|capacity| *capacity > 0),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        self.label
    }

    pub(crate) fn replicas(&self) -> u16 {
        self.replicas
    }

    pub(crate) fn input_capacity(&self) -> Option<usize> {
        self.input_capacity
    }
}
