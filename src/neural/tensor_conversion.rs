use crate::game::position::{Position, Side};
use shakmaty::{CastlingSide, Role};

/// Number of board tokens fed to the model (one per square).
pub const BOARD_SQUARES: usize = 64;

/// Fixed-shape model input for one position.
///
/// `board` is indexed a1 = 0 .. h8 = 63. Empty squares are 0, white pieces
/// P N B R Q K are 1..=6 and black pieces p n b r q k are 7..=12.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleInput {
    pub board: [i64; BOARD_SQUARES],
    /// 1 when white is to move, 0 for black.
    pub turn: i64,
    pub white_kingside: i64,
    pub white_queenside: i64,
    pub black_kingside: i64,
    pub black_queenside: i64,
}

fn piece_token(side: Side, role: Role) -> i64 {
    let base = match role {
        Role::Pawn => 1,
        Role::Knight => 2,
        Role::Bishop => 3,
        Role::Rook => 4,
        Role::Queen => 5,
        Role::King => 6,
    };
    match side {
        Side::White => base,
        Side::Black => base + 6,
    }
}

fn flag(value: bool) -> i64 {
    i64::from(value)
}

pub fn encode(position: &Position) -> OracleInput {
    let mut board = [0i64; BOARD_SQUARES];
    for (index, token) in board.iter_mut().enumerate() {
        if let Some((side, role)) = position.piece_at(index as u32) {
            *token = piece_token(side, role);
        }
    }

    OracleInput {
        board,
        turn: flag(position.side_to_move() == Side::White),
        white_kingside: flag(position.can_castle(Side::White, CastlingSide::KingSide)),
        white_queenside: flag(position.can_castle(Side::White, CastlingSide::QueenSide)),
        black_kingside: flag(position.can_castle(Side::Black, CastlingSide::KingSide)),
        black_queenside: flag(position.can_castle(Side::Black, CastlingSide::QueenSide)),
    }
}

/// Batch-of-one tensors in the layout the transformer expects.
#[cfg(feature = "torch")]
pub struct BoardTensors {
    pub board_positions: tch::Tensor,
    pub turns: tch::Tensor,
    pub white_kingside: tch::Tensor,
    pub white_queenside: tch::Tensor,
    pub black_kingside: tch::Tensor,
    pub black_queenside: tch::Tensor,
}

#[cfg(feature = "torch")]
impl OracleInput {
    pub fn to_tensors(&self, device: tch::Device) -> BoardTensors {
        let scalar = |v: i64| tch::Tensor::from_slice(&[v]).view([1, 1]).to_device(device);
        BoardTensors {
            board_positions: tch::Tensor::from_slice(&self.board)
                .view([1, BOARD_SQUARES as i64])
                .to_device(device),
            turns: scalar(self.turn),
            white_kingside: scalar(self.white_kingside),
            white_queenside: scalar(self.white_queenside),
            black_kingside: scalar(self.black_kingside),
            black_queenside: scalar(self.black_queenside),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_starting_position() {
        let input = encode(&Position::starting());

        assert_eq!(&input.board[0..8], &[4, 2, 3, 5, 6, 3, 2, 4]);
        assert!(input.board[8..16].iter().all(|&t| t == 1));
        assert!(input.board[16..48].iter().all(|&t| t == 0));
        assert!(input.board[48..56].iter().all(|&t| t == 7));
        assert_eq!(&input.board[56..64], &[10, 8, 9, 11, 12, 9, 8, 10]);
        assert_eq!(input.turn, 1);
        assert_eq!(
            (
                input.white_kingside,
                input.white_queenside,
                input.black_kingside,
                input.black_queenside
            ),
            (1, 1, 1, 1)
        );
    }

    #[test]
    fn test_encode_turn_and_castling() {
        let position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R b Kq - 0 1").unwrap();
        let input = encode(&position);

        assert_eq!(input.turn, 0);
        assert_eq!(input.white_kingside, 1);
        assert_eq!(input.white_queenside, 0);
        assert_eq!(input.black_kingside, 0);
        assert_eq!(input.black_queenside, 1);
    }

    #[test]
    fn test_encode_is_pure() {
        let position = Position::starting();
        assert_eq!(encode(&position), encode(&position));
    }
}
