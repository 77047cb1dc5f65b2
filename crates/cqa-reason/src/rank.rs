//! Result ranking.

use crate::Result;
use cqa_kge::{EntityId, KgIndex, ScoreVector};
use serde::{Deserialize, Serialize};

/// A candidate answer entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub entity: EntityId,
    pub name: String,
    pub score: f32,
}

/// Sort scores descending into named answers.
///
/// One answer per entity with a finite score. The sort is stable, so equal
/// scores keep ascending id order.
pub fn rank(scores: &ScoreVector, index: &KgIndex) -> Result<Vec<Answer>> {
    if scores.len() != index.num_entities() {
        return Err(cqa_kge::Error::Validation(format!(
            "{} scores for {} entities",
            scores.len(),
            index.num_entities()
        ))
        .into());
    }
    let mut answers = scores
        .iter()
        .filter(|(_, score)| score.is_finite())
        .map(|(entity, score)| -> Result<Answer> {
            Ok(Answer {
                entity,
                name: index.entity_name(entity)?.to_string(),
                score,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    answers.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(answers)
}
