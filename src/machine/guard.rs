//! Transition guards

/// A side-effect free precondition on a transition.
///
/// The check returns `Err(reason)` describing which precondition failed, so a
/// rejected transition can tell the user what to fix ("3 tasks remain
/// unresolved") rather than just "no".
pub struct Guard<C> {
    description: String,
    check: Box<dyn Fn(&C) -> Result<(), String>>,
}

impl<C> Guard<C> {
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&C) -> Result<(), String> + 'static,
    {
        Self {
            description: description.into(),
            check: Box::new(check),
        }
    }

    /// Build a guard from a boolean predicate; the description doubles as the
    /// rejection reason.
    pub fn predicate<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + 'static,
    {
        let description = description.into();
        let reason = description.clone();
        Self::new(description, move |ctx| {
            if predicate(ctx) {
                Ok(())
            } else {
                Err(reason.clone())
            }
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn evaluate(&self, ctx: &C) -> Result<(), String> {
        (self.check)(ctx)
    }

    pub fn allows(&self, ctx: &C) -> bool {
        self.evaluate(ctx).is_ok()
    }
}

impl<C> std::fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
