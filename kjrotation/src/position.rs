//! Arithmétique de positions denses et d'anneau
//!
//! Toutes les échelles ordonnées de la session (rotation, file d'un
//! chanteur, liste d'un régulier) obéissent au même invariant : les
//! positions forment exactement la permutation 0..N-1. Ce module regroupe
//! les primitives pures qui maintiennent et réparent cet invariant, ainsi
//! que l'arithmétique d'anneau du tour par tour.

use std::fmt;

/// Élément porteur d'une position dense
pub(crate) trait Positioned {
    fn position(&self) -> usize;
    fn set_position(&mut self, position: usize);
}

/// Défaut de densité détecté dans une échelle de positions
///
/// N éléments tous en 0..N-1 sans doublon forment nécessairement une
/// permutation : un trou se manifeste donc toujours comme doublon ou comme
/// position hors borne.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PositionFault {
    Duplicate(usize),
    OutOfRange { position: usize, len: usize },
}

impl fmt::Display for PositionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionFault::Duplicate(p) => write!(f, "duplicate position {}", p),
            PositionFault::OutOfRange { position, len } => {
                write!(f, "position {} out of range for {} items", position, len)
            }
        }
    }
}

/// Cherche le premier défaut de densité
pub(crate) fn find_fault<T: Positioned>(items: &[T]) -> Option<PositionFault> {
    let len = items.len();
    let mut seen = vec![false; len];
    for item in items {
        let p = item.position();
        if p >= len {
            return Some(PositionFault::OutOfRange { position: p, len });
        }
        if seen[p] {
            return Some(PositionFault::Duplicate(p));
        }
        seen[p] = true;
    }
    None
}

/// Réassigne les positions 0..N-1 dans l'ordre courant
///
/// Les éléments sont triés par position (tri stable : l'ordre relatif des
/// doublons est conservé) puis renumérotés. Sert après suppression et comme
/// primitive de réparation.
pub(crate) fn compact<T: Positioned>(items: &mut [T]) {
    items.sort_by_key(|item| item.position());
    for (index, item) in items.iter_mut().enumerate() {
        item.set_position(index);
    }
}

/// Décale de `delta` les positions de l'intervalle (low_excl, high_incl]
///
/// Les bornes sont signées pour exprimer un intervalle fermé débutant à 0
/// (`low_excl = -1`). L'élément déplacé lui-même n'est jamais dans
/// l'intervalle : l'appelant le replace ensuite.
pub(crate) fn shift_range<T: Positioned>(items: &mut [T], low_excl: i64, high_incl: i64, delta: i64) {
    for item in items.iter_mut() {
        let p = item.position() as i64;
        if p > low_excl && p <= high_incl {
            item.set_position((p + delta) as usize);
        }
    }
}

/// Nombre de tours entre deux positions sur l'anneau : (to - from + n) mod n
pub(crate) fn ring_distance(n: usize, from: usize, to: usize) -> usize {
    if n == 0 {
        return 0;
    }
    (to + n - from) % n
}

/// Attente estimée en marchant sur l'anneau de `from` vers `to`
///
/// `current_remaining` remplace la contribution propre de `from` ; chaque
/// position strictement entre les deux ajoute `per_position[p]`. Retourne 0
/// quand `from == to`.
pub(crate) fn ring_wait(
    n: usize,
    from: usize,
    to: usize,
    per_position: &[u32],
    current_remaining: u32,
) -> u32 {
    if n == 0 || from == to {
        return 0;
    }

    let mut total = current_remaining;
    let hops = ring_distance(n, from, to);
    for k in 1..hops {
        let p = (from + k) % n;
        total += per_position.get(p).copied().unwrap_or(0);
    }
    total
}
