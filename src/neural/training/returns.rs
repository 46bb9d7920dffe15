//! Retours actualisés et normalisation des avantages

/// Discounted return for every step of one episode.
///
/// `G_t = r_t + gamma * G_{t+1}`, with the running sum reset to zero at each
/// non-zero reward: in Pong a reward marks the end of a point, and actions
/// after it had no influence on it.
pub fn discount_rewards(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running = 0.0f32;
    for (t, &reward) in rewards.iter().enumerate().rev() {
        if reward != 0.0 {
            running = 0.0;
        }
        running = running * gamma + reward;
        returns[t] = running;
    }
    returns
}

/// Z-score normalisation. When the spread is (near) zero only the mean is removed.
pub fn standardize(values: &[f32]) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    let std = variance.sqrt();
    if std > 1e-6 {
        values.iter().map(|v| (v - mean) / std).collect()
    } else {
        values.iter().map(|v| v - mean).collect()
    }
}
