//! Encoder-only chess transformer, used as the policy/value oracle.
//!
//! Input tokens: 64 board squares, the side to move and the four castling flags,
//! each embedded separately and summed with a learned positional embedding.
//! Encoder blocks are attention → dropout → LayerNorm → feed-forward → dropout →
//! LayerNorm (no residual connections). The flattened sequence feeds a move head
//! (logits over the move vocabulary) and a sigmoid win-rate head.
//!
//! Variable paths mirror the PyTorch module tree so that an exported state dict
//! loads as is.

use crate::neural::model_io::load_varstore;
use crate::neural::move_vocabulary::MoveVocabulary;
use crate::neural::oracle::{OracleError, OracleOutput, PolicyValueOracle};
use crate::neural::tensor_conversion::{BoardTensors, OracleInput};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tch::nn::{self, Module};
use tch::{Device, Kind, Tensor};

/// Hyperparameters of the network, as stored next to the checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub embed_dim: i64,
    pub num_heads: i64,
    pub ff_dim: i64,
    pub num_layers: i64,
    #[serde(default)]
    pub dropout: f64,
    #[serde(default = "default_board_vocab_size")]
    pub board_vocab_size: i64,
    /// Sequence length: 64 squares + turn + 4 castling flags.
    #[serde(default = "default_pos_size")]
    pub pos_size: i64,
    #[serde(default = "default_binary_size")]
    pub turn_size: i64,
    #[serde(default = "default_binary_size")]
    pub castling_size: i64,
    pub moves_vocab_size: i64,
}

fn default_board_vocab_size() -> i64 {
    13
}

fn default_pos_size() -> i64 {
    69
}

fn default_binary_size() -> i64 {
    2
}

impl ModelConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OracleError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| OracleError::Load(format!("cannot read {}: {}", path.display(), e)))?;
        let config: ModelConfig = serde_json::from_str(&text)
            .map_err(|e| OracleError::Load(format!("invalid model config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OracleError> {
        if self.embed_dim <= 0 || self.num_heads <= 0 || self.embed_dim % self.num_heads != 0 {
            return Err(OracleError::Load(format!(
                "embed_dim {} must be a positive multiple of num_heads {}",
                self.embed_dim, self.num_heads
            )));
        }
        if self.pos_size != 69 {
            return Err(OracleError::Load(format!(
                "pos_size must be 69 (64 squares + 5 state tokens), got {}",
                self.pos_size
            )));
        }
        if self.ff_dim <= 0 || self.num_layers <= 0 || self.moves_vocab_size <= 0 {
            return Err(OracleError::Load("ff_dim, num_layers and moves_vocab_size must be positive".into()));
        }
        Ok(())
    }
}

struct SelfAttention {
    in_proj_weight: Tensor,
    in_proj_bias: Tensor,
    out_proj: nn::Linear,
    num_heads: i64,
}

impl SelfAttention {
    fn new(p: &nn::Path, embed_dim: i64, num_heads: i64) -> Self {
        let bound = (1.0 / embed_dim as f64).sqrt();
        Self {
            in_proj_weight: p.var(
                "in_proj_weight",
                &[3 * embed_dim, embed_dim],
                nn::Init::Uniform { lo: -bound, up: bound },
            ),
            in_proj_bias: p.var("in_proj_bias", &[3 * embed_dim], nn::Init::Const(0.0)),
            out_proj: nn::linear(p / "out_proj", embed_dim, embed_dim, Default::default()),
            num_heads,
        }
    }

    /// `x`: [batch, seq, embed] → [batch, seq, embed]
    fn forward(&self, x: &Tensor) -> Tensor {
        let (batch, seq, embed) = x.size3().unwrap_or((1, 1, 1));
        let head_dim = embed / self.num_heads;

        let qkv = x.matmul(&self.in_proj_weight.transpose(0, 1)) + &self.in_proj_bias;
        let parts = qkv.chunk(3, -1);
        let heads = |t: &Tensor| {
            t.view([batch, seq, self.num_heads, head_dim])
                .transpose(1, 2)
        };
        let (q, k, v) = (heads(&parts[0]), heads(&parts[1]), heads(&parts[2]));

        let scores = q.matmul(&k.transpose(-2, -1)) / (head_dim as f64).sqrt();
        let attended = scores.softmax(-1, Kind::Float).matmul(&v);
        attended
            .transpose(1, 2)
            .contiguous()
            .view([batch, seq, embed])
            .apply(&self.out_proj)
    }
}

struct EncoderBlock {
    attn: SelfAttention,
    norm1: nn::LayerNorm,
    ff_in: nn::Linear,
    ff_out: nn::Linear,
    norm2: nn::LayerNorm,
    dropout: f64,
}

impl EncoderBlock {
    fn new(p: &nn::Path, config: &ModelConfig) -> Self {
        let e = config.embed_dim;
        Self {
            attn: SelfAttention::new(&(p / "attn"), e, config.num_heads),
            norm1: nn::layer_norm(p / "norm1", vec![e], Default::default()),
            ff_in: nn::linear(p / "ff" / 0, e, config.ff_dim, Default::default()),
            ff_out: nn::linear(p / "ff" / 2, config.ff_dim, e, Default::default()),
            norm2: nn::layer_norm(p / "norm2", vec![e], Default::default()),
            dropout: config.dropout,
        }
    }

    fn forward_t(&self, x: &Tensor, train: bool) -> Tensor {
        let h = self
            .attn
            .forward(x)
            .dropout(self.dropout, train)
            .apply(&self.norm1);
        h.apply(&self.ff_in)
            .relu()
            .apply(&self.ff_out)
            .dropout(self.dropout, train)
            .apply(&self.norm2)
    }
}

pub struct ChessTransformer {
    config: ModelConfig,
    board_embed: nn::Embedding,
    positional_embed: nn::Embedding,
    turn_embed: nn::Embedding,
    white_kingside_embed: nn::Embedding,
    white_queenside_embed: nn::Embedding,
    black_kingside_embed: nn::Embedding,
    black_queenside_embed: nn::Embedding,
    blocks: Vec<EncoderBlock>,
    norm: nn::LayerNorm,
    moves_head: nn::Linear,
    winrate_head: nn::Linear,
}

impl ChessTransformer {
    pub fn new(vs: &nn::VarStore, config: ModelConfig) -> Self {
        let p = vs.root();
        let e = config.embed_dim;
        let embed = |name: &str, size: i64| nn::embedding(&p / name, size, e, Default::default());

        let blocks = (0..config.num_layers)
            .map(|i| EncoderBlock::new(&(&p / "transformer_blocks" / i), &config))
            .collect();
        let flat = e * config.pos_size;

        Self {
            board_embed: embed("board_embed", config.board_vocab_size),
            positional_embed: embed("positional_embed", config.pos_size),
            turn_embed: embed("turn_embed", config.turn_size),
            white_kingside_embed: embed("white_kingside_castling_rights_embed", config.castling_size),
            white_queenside_embed: embed("white_queenside_castling_rights_embed", config.castling_size),
            black_kingside_embed: embed("black_kingside_castling_rights_embed", config.castling_size),
            black_queenside_embed: embed("black_queenside_castling_rights_embed", config.castling_size),
            blocks,
            norm: nn::layer_norm(&p / "norm", vec![e], Default::default()),
            moves_head: nn::linear(&p / "moves_head", flat, config.moves_vocab_size, Default::default()),
            winrate_head: nn::linear(&p / "winrate_head" / 0, flat, 1, Default::default()),
            config,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Returns (move logits [batch, vocab], win rate [batch, 1]).
    pub fn forward_t(&self, batch: &BoardTensors, train: bool) -> (Tensor, Tensor) {
        let embeddings = Tensor::cat(
            &[
                self.board_embed.forward(&batch.board_positions),
                self.turn_embed.forward(&batch.turns),
                self.white_kingside_embed.forward(&batch.white_kingside),
                self.white_queenside_embed.forward(&batch.white_queenside),
                self.black_kingside_embed.forward(&batch.black_kingside),
                self.black_queenside_embed.forward(&batch.black_queenside),
            ],
            1,
        );

        let mut boards = (embeddings + self.positional_embed.ws.unsqueeze(0)).dropout(self.config.dropout, train);
        for block in &self.blocks {
            boards = block.forward_t(&boards, train);
        }

        let boards = boards.apply(&self.norm);
        let batch_size = boards.size()[0];
        let flat = boards.view([batch_size, -1]);

        (flat.apply(&self.moves_head), flat.apply(&self.winrate_head).sigmoid())
    }
}

/// Loaded transformer plus the vocabulary its move head was trained on.
pub struct TransformerOracle {
    _vs: nn::VarStore,
    model: ChessTransformer,
    vocabulary: MoveVocabulary,
    device: Device,
}

impl TransformerOracle {
    pub fn load(
        config: ModelConfig,
        checkpoint: impl AsRef<Path>,
        vocabulary: MoveVocabulary,
        device: Device,
    ) -> Result<Self, OracleError> {
        if vocabulary.len() as i64 != config.moves_vocab_size {
            return Err(OracleError::ShapeMismatch {
                expected: vocabulary.len(),
                actual: config.moves_vocab_size as usize,
            });
        }

        let mut vs = nn::VarStore::new(device);
        let model = ChessTransformer::new(&vs, config);
        load_varstore(&mut vs, checkpoint.as_ref())?;
        log::info!(
            "Transformer oracle ready: {} layers, embed {}, {} moves, device {:?}",
            model.config().num_layers,
            model.config().embed_dim,
            vocabulary.len(),
            device
        );

        Ok(Self {
            _vs: vs,
            model,
            vocabulary,
            device,
        })
    }
}

impl PolicyValueOracle for TransformerOracle {
    fn vocabulary(&self) -> &MoveVocabulary {
        &self.vocabulary
    }

    fn evaluate(&self, input: &OracleInput) -> Result<OracleOutput, OracleError> {
        let batch = input.to_tensors(self.device);
        let (logits, winrate) = tch::no_grad(|| self.model.forward_t(&batch, false));

        let probabilities = logits
            .softmax(-1, Kind::Float)
            .to_device(Device::Cpu)
            .flatten(0, -1);
        let policy = Vec::<f32>::try_from(&probabilities).map_err(|e| OracleError::Inference(e.to_string()))?;
        if policy.len() != self.vocabulary.len() {
            return Err(OracleError::ShapeMismatch {
                expected: self.vocabulary.len(),
                actual: policy.len(),
            });
        }

        let value = winrate
            .to_device(Device::Cpu)
            .f_double_value(&[0, 0])
            .map_err(|e| OracleError::Inference(e.to_string()))?;

        Ok(OracleOutput {
            policy,
            value: value as f32,
        })
    }
}
