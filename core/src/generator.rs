use rand::Rng;

use crate::instruction::{KeyValue, UpdateInstruction};

pub const SET_COLUMN: &str = "unit";
pub const WHERE_COLUMN: &str = "age";
pub const ID_COLUMN: &str = "id";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GeneratorError {
    #[error("Instruction count must be at least 1")]
    EmptyBatch,

    #[error("Collision rate must be within [0, 1), got {0}")]
    CollisionRateOutOfRange(f64),
}

fn check_arguments(count: usize, collision_rate: f64) -> Result<(), GeneratorError> {
    if count == 0 {
        return Err(GeneratorError::EmptyBatch);
    }

    if !collision_rate.is_finite() || !(0.0..1.0).contains(&collision_rate) {
        return Err(GeneratorError::CollisionRateOutOfRange(collision_rate));
    }

    Ok(())
}

/// Exclusive upper bound of the values drawn for a batch of `count`.
///
/// A higher collision rate shrinks the domain so more instructions share a key.
pub fn collision_domain(count: usize, collision_rate: f64) -> i64 {
    (count as f64 * (1.0 - collision_rate)).floor() as i64 + 1
}

pub fn random_collision<R: Rng + ?Sized>(rng: &mut R, count: usize, collision_rate: f64) -> i64 {
    rng.random_range(0..collision_domain(count, collision_rate))
}

/// `SET unit = ? WHERE age = ?` instructions with both values drawn
/// independently from the collision domain.
pub fn generate(count: usize, collision_rate: f64) -> Result<Vec<UpdateInstruction>, GeneratorError> {
    generate_with_rng(&mut rand::rng(), count, collision_rate)
}

pub fn generate_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    collision_rate: f64,
) -> Result<Vec<UpdateInstruction>, GeneratorError> {
    check_arguments(count, collision_rate)?;

    Ok((0..count)
        .map(|_| {
            UpdateInstruction::new(
                vec![KeyValue::new(SET_COLUMN, random_collision(rng, count, collision_rate))],
                vec![KeyValue::new(WHERE_COLUMN, random_collision(rng, count, collision_rate))],
            )
        })
        .collect())
}

/// `SET unit = ? WHERE id = ?` instructions targeting the primary key. Ids start
/// at 1 so the WHERE draw is offset by one.
pub fn generate_with_id(
    count: usize,
    collision_rate: f64,
) -> Result<Vec<UpdateInstruction>, GeneratorError> {
    generate_with_id_with_rng(&mut rand::rng(), count, collision_rate)
}

pub fn generate_with_id_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    collision_rate: f64,
) -> Result<Vec<UpdateInstruction>, GeneratorError> {
    check_arguments(count, collision_rate)?;

    Ok((0..count)
        .map(|_| {
            UpdateInstruction::new(
                vec![KeyValue::new(SET_COLUMN, random_collision(rng, count, collision_rate))],
                vec![KeyValue::new(ID_COLUMN, random_collision(rng, count, collision_rate) + 1)],
            )
        })
        .collect())
}
