/// UCB1 multi-armed bandit with exponential forgetting.
///
/// The outer controller uses a [`Ucb1Learner`] to pick tabu-search episode
/// parameters; the reward fed back after each episode is the normalized
/// improvement it achieved. The `decay_factor` discounts old samples so the
/// learner tracks the non-stationary reward landscape of a progressing
/// search.
#[derive(Debug, Clone)]
pub struct Ucb1Action<T> {
    pub body: T,
    pub number_of_samples: f64,
    pub total_score: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub confidence: f64,
}

impl<T> Ucb1Action<T> {
    pub fn new(body: T) -> Self {
        Self {
            body,
            number_of_samples: 0.0,
            total_score: 0.0,
            mean: 0.0,
            min: f64::MAX,
            max: f64::MIN,
            confidence: 0.0,
        }
    }

    fn range(&self) -> f64 {
        if self.max > self.min {
            self.max - self.min
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ucb1Learner<T> {
    actions: Vec<Ucb1Action<T>>,
    best_index: usize,
    total_number_of_samples: f64,
    decay_factor: f64,
}

impl<T> Ucb1Learner<T> {
    pub fn new(bodies: Vec<T>, decay_factor: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&decay_factor));
        Self {
            actions: bodies.into_iter().map(Ucb1Action::new).collect(),
            best_index: 0,
            total_number_of_samples: 0.0,
            decay_factor,
        }
    }

    pub fn actions(&self) -> &[Ucb1Action<T>] {
        &self.actions
    }

    pub fn best_action(&self) -> &Ucb1Action<T> {
        &self.actions[self.best_index]
    }

    pub fn total_number_of_samples(&self) -> f64 {
        self.total_number_of_samples
    }

    pub fn decay_factor(&self) -> f64 {
        self.decay_factor
    }

    /// Feed the reward observed for the current best action, decay all
    /// statistics, and re-select the next action by its upper confidence
    /// bound. Unsampled actions are tried first, in order.
    pub fn learn(&mut self, score: f64) {
        {
            let action = &mut self.actions[self.best_index];
            action.number_of_samples += 1.0;
            action.total_score += score;
            action.mean = action.total_score / action.number_of_samples;
            action.min = action.min.min(score);
            action.max = action.max.max(score);
        }
        self.total_number_of_samples += 1.0;

        for action in &mut self.actions {
            action.number_of_samples *= self.decay_factor;
            action.total_score *= self.decay_factor;
        }
        self.total_number_of_samples *= self.decay_factor;

        if let Some(unsampled) = self
            .actions
            .iter()
            .position(|action| action.number_of_samples < f64::EPSILON)
        {
            self.best_index = unsampled;
            return;
        }

        let mut best_index = 0;
        let mut best_confidence = f64::MIN;
        for (index, action) in self.actions.iter_mut().enumerate() {
            action.confidence = action.mean
                + action.range()
                    * (2.0 * self.total_number_of_samples.ln() / action.number_of_samples).sqrt();
            if action.confidence > best_confidence {
                best_confidence = action.confidence;
                best_index = index;
            }
        }
        self.best_index = best_index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_unsampled_actions_first() {
        let mut learner = Ucb1Learner::new(vec![0, 1, 2], 0.9);
        assert_eq!(learner.best_action().body, 0);
        learner.learn(1.0);
        assert_eq!(learner.best_action().body, 1);
        learner.learn(0.0);
        assert_eq!(learner.best_action().body, 2);
    }

    #[test]
    fn prefers_high_reward_action() {
        let mut learner = Ucb1Learner::new(vec![0, 1], 1.0);
        // action 0 yields 1.0, action 1 yields 0.0
        for _ in 0..50 {
            let reward = if learner.best_action().body == 0 {
                1.0
            } else {
                0.0
            };
            learner.learn(reward);
        }
        let samples_0 = learner.actions()[0].number_of_samples;
        let samples_1 = learner.actions()[1].number_of_samples;
        assert!(
            samples_0 > samples_1,
            "high-reward action should dominate: {samples_0} vs {samples_1}"
        );
    }

    #[test]
    fn decay_discounts_old_samples() {
        let mut learner = Ucb1Learner::new(vec![0], 0.5);
        learner.learn(10.0);
        assert!(learner.total_number_of_samples() < 1.0);
        assert!(learner.actions()[0].total_score < 10.0);
    }
}
