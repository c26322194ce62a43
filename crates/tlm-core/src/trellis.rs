//! Trellis Tables
//!
//! The encoder memory is a (K-1)-bit shift register. State indices store the
//! newest bit in the LSB, so for K=3 a state is `{s1, s0}` with `s0` the most
//! recent input:
//!
//! ```text
//!   next(s, u) = ((s << 1) | u) & (2^(K-1) - 1)
//!
//!   state   u=0 ──► next / out     u=1 ──► next / out      (G = 7, 5)
//!   00            00 / 00                01 / 11
//!   01            10 / 10                11 / 01
//!   10            00 / 11                01 / 00
//!   11            10 / 01                11 / 10
//! ```
//!
//! Every state `q` is entered from exactly two predecessors that differ only
//! in the bit dropped off the old end of the register. Both edges carry the
//! same input bit (the LSB of `q`). The edge from the predecessor whose dropped
//! bit is 0 is listed first and wins metric ties in the decoder.
//!
//! All tables are generated once from K and the generator polynomials.

use crate::params::CodeParams;
use crate::types::{FecResult, Symbol};

/// One trellis branch entering a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Predecessor state index.
    pub from: usize,
    /// Input bit that drives the transition.
    pub input: bool,
    /// Code symbol the encoder emits on this branch.
    pub output: Symbol,
}

/// Precomputed state-transition tables for a rate-1/2 feedforward code.
#[derive(Debug, Clone)]
pub struct Trellis {
    constraint_length: usize,
    generators: [u32; 2],
    num_states: usize,
    /// next_states[state][input]
    next_states: Vec<[usize; 2]>,
    /// outputs[state][input]
    outputs: Vec<[Symbol; 2]>,
    /// incoming[state] = [edge with dropped bit 0, edge with dropped bit 1]
    incoming: Vec<[Edge; 2]>,
}

impl Trellis {
    /// Validate `params` and build the tables.
    pub fn new(params: &CodeParams) -> FecResult<Self> {
        params.validate()?;
        Ok(Self::from_code(params.constraint_length, params.generators))
    }

    fn from_code(constraint_length: usize, generators: [u32; 2]) -> Self {
        let num_states = 1usize << (constraint_length - 1);
        let mask = num_states - 1;
        // Octal generators tap the input with their MSB; the window below
        // holds the input in bit 0, so the taps are mirrored.
        let taps = [
            reverse_bits(generators[0], constraint_length),
            reverse_bits(generators[1], constraint_length),
        ];

        let mut next_states = Vec::with_capacity(num_states);
        let mut outputs = Vec::with_capacity(num_states);
        for state in 0..num_states {
            let mut nexts = [0usize; 2];
            let mut outs = [Symbol::ZERO; 2];
            for input in 0..2usize {
                let window = ((state << 1) | input) as u32;
                nexts[input] = ((state << 1) | input) & mask;
                outs[input] = Symbol::new(parity(window & taps[0]), parity(window & taps[1]));
            }
            next_states.push(nexts);
            outputs.push(outs);
        }

        // Predecessors share the upper bits of q and differ in the dropped bit.
        let dropped = 1usize << (constraint_length - 2);
        let incoming = (0..num_states)
            .map(|q| {
                let input = q & 1;
                let (p0, p1) = (q >> 1, (q >> 1) | dropped);
                [
                    Edge {
                        from: p0,
                        input: input == 1,
                        output: outputs[p0][input],
                    },
                    Edge {
                        from: p1,
                        input: input == 1,
                        output: outputs[p1][input],
                    },
                ]
            })
            .collect();

        Self {
            constraint_length,
            generators,
            num_states,
            next_states,
            outputs,
            incoming,
        }
    }

    pub fn constraint_length(&self) -> usize {
        self.constraint_length
    }

    pub fn generators(&self) -> [u32; 2] {
        self.generators
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// State reached from `state` on `input`.
    #[inline]
    pub fn next_state(&self, state: usize, input: bool) -> usize {
        self.next_states[state][input as usize]
    }

    /// Symbol emitted when leaving `state` on `input`.
    #[inline]
    pub fn output(&self, state: usize, input: bool) -> Symbol {
        self.outputs[state][input as usize]
    }

    /// The two branches entering `state`, preferred edge first.
    #[inline]
    pub fn incoming(&self, state: usize) -> &[Edge; 2] {
        &self.incoming[state]
    }

    /// Compute the free distance (d_free) of the code.
    ///
    /// Depth-first enumeration of every path that leaves the zero state on a
    /// 1 and returns to it, keeping the minimum output weight. Only practical
    /// for small K.
    pub fn free_distance(&self) -> usize {
        let max_path_len = self.num_states + self.constraint_length;
        let mut min_dist = usize::MAX;

        let first = self.next_state(0, true);
        let weight = self.output(0, true).distance(Symbol::ZERO) as usize;
        let mut stack = vec![(first, weight, 1usize)];

        while let Some((state, weight, depth)) = stack.pop() {
            if depth >= max_path_len || weight >= min_dist {
                continue;
            }
            for input in [false, true] {
                let next = self.next_state(state, input);
                let total = weight + self.output(state, input).distance(Symbol::ZERO) as usize;
                if next == 0 {
                    min_dist = min_dist.min(total);
                } else if total < min_dist {
                    stack.push((next, total, depth + 1));
                }
            }
        }

        if min_dist == usize::MAX {
            0
        } else {
            min_dist
        }
    }
}

/// XOR-reduce.
#[inline]
fn parity(v: u32) -> bool {
    v.count_ones() & 1 == 1
}

/// Reverse the low `width` bits of `v`.
fn reverse_bits(v: u32, width: usize) -> u32 {
    v.reverse_bits() >> (32 - width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FecError;

    fn k3() -> Trellis {
        Trellis::new(&CodeParams::default()).unwrap()
    }

    #[test]
    fn test_state_count() {
        assert_eq!(k3().num_states(), 4);
        assert_eq!(Trellis::new(&CodeParams::nasa_k7_rate_half()).unwrap().num_states(), 64);
    }

    #[test]
    fn test_k3_table() {
        let t = k3();
        // (state, input) -> (next, y0y1)
        let expected = [
            (0, false, 0, 0b00),
            (0, true, 1, 0b11),
            (1, false, 2, 0b10),
            (1, true, 3, 0b01),
            (2, false, 0, 0b11),
            (2, true, 1, 0b00),
            (3, false, 2, 0b01),
            (3, true, 3, 0b10),
        ];
        for (state, input, next, out) in expected {
            assert_eq!(t.next_state(state, input), next, "next({}, {})", state, input);
            assert_eq!(t.output(state, input).bits(), out, "out({}, {})", state, input);
        }
    }

    #[test]
    fn test_incoming_edges_are_consistent() {
        let t = Trellis::new(&CodeParams::gsm_k5_rate_half()).unwrap();
        for q in 0..t.num_states() {
            let [e0, e1] = *t.incoming(q);
            assert!(e0.from < e1.from);
            assert_eq!(e0.input, e1.input);
            for e in [e0, e1] {
                assert_eq!(t.next_state(e.from, e.input), q);
                assert_eq!(t.output(e.from, e.input), e.output);
            }
        }
    }

    #[test]
    fn test_every_state_entered_twice() {
        let t = k3();
        let mut count = vec![0; t.num_states()];
        for s in 0..t.num_states() {
            for input in [false, true] {
                count[t.next_state(s, input)] += 1;
            }
        }
        assert!(count.iter().all(|&c| c == 2));
    }

    #[test]
    fn test_free_distance() {
        assert_eq!(k3().free_distance(), 5);
    }

    #[test]
    fn test_generator_msb_taps_input() {
        // G0 = 6 (110) taps the input and the newest bit, never the oldest
        let p = CodeParams::builder().generators(0o6, 0o5).build().unwrap();
        let t = Trellis::new(&p).unwrap();
        // state 10: oldest bit set, newest clear
        assert_eq!(t.output(2, false).bits(), 0b01);
        assert_eq!(t.output(1, false).bits(), 0b10);
    }

    #[test]
    fn test_rejects_invalid_params() {
        let k1 = CodeParams {
            constraint_length: 1,
            ..CodeParams::default()
        };
        assert_eq!(Trellis::new(&k1).unwrap_err(), FecError::InvalidConstraintLength(1));

        let wide = CodeParams {
            generators: [0o17, 0o5],
            ..CodeParams::default()
        };
        assert!(Trellis::new(&wide).is_err());
    }

    #[test]
    fn test_k2_trellis() {
        let p = CodeParams::builder().constraint_length(2).generators(0o3, 0o1).build().unwrap();
        let t = Trellis::new(&p).unwrap();
        assert_eq!(t.num_states(), 2);
        assert_eq!(t.incoming(1)[0].from, 0);
        assert_eq!(t.incoming(1)[1].from, 1);
    }
}
