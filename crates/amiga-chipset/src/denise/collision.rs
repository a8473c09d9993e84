//! Collision detection (CLXCON/CLXDAT).
//!
//! CLXCON: ENSP7 ENSP5 ENSP3 ENSP1 (15-12) ENBP6-ENBP1 (11-6) MVBP6-MVBP1 (5-0)
//!
//! CLXDAT bits:
//! - 0: odd planes vs even planes
//! - 1-4: odd planes vs sprite pairs 0-3
//! - 5-8: even planes vs sprite pairs 0-3
//! - 9-14: sprite pair vs sprite pair (01/23, 01/45, 01/67, 23/45, 23/67, 45/67)

/// Sprite group pairs and their CLXDAT bit.
const PAIRS: [(u8, u16); 6] = [
    (0b0011, 9),
    (0b0101, 10),
    (0b1001, 11),
    (0b0110, 12),
    (0b1010, 13),
    (0b1100, 14),
];

/// Sprite pairs taking part in collisions. Odd sprites count only when
/// their ENSP bit is set.
#[must_use]
pub fn sprite_groups(present: u8, clxcon: u16) -> u8 {
    let mut mask = 0;
    for sprite in 0..8 {
        if present & (1 << sprite) == 0 {
            continue;
        }
        let enabled = sprite & 1 == 0 || clxcon & (0x1000 << (sprite / 2)) != 0;
        if enabled {
            mask |= 1 << (sprite / 2);
        }
    }
    mask
}

/// Do the enabled planes of one group match their MVBP values?
#[must_use]
pub fn planes_match(clxcon: u16, plane_bits: u8, even_planes: bool) -> bool {
    let planes: [u16; 3] = if even_planes { [1, 3, 5] } else { [0, 2, 4] };
    planes.into_iter().all(|p| {
        let enabled = clxcon & (1 << (6 + p)) != 0;
        let expected = clxcon & (1 << p) != 0;
        let actual = u16::from(plane_bits) & (1 << p) != 0;
        !enabled || actual == expected
    })
}

/// CLXDAT bits produced by one pixel.
#[must_use]
pub fn collision_bits(clxcon: u16, plane_bits: u8, groups: u8) -> u16 {
    let odd = planes_match(clxcon, plane_bits, false);
    let even = planes_match(clxcon, plane_bits, true);
    let mut bits = u16::from(odd && even);

    for group in 0..4 {
        if groups & (1 << group) == 0 {
            continue;
        }
        if odd {
            bits |= 1 << (1 + group);
        }
        if even {
            bits |= 1 << (5 + group);
        }
    }

    for (pair, bit) in PAIRS {
        if groups & pair == pair {
            bits |= 1 << bit;
        }
    }
    bits
}
