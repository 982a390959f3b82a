use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, do not add them again.
#[derive(Config, Debug)]
pub struct TextEncoderConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
}

impl TextEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextEncoder<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        TextEncoder {
            token_embedding, position_embedding, layers,
            final_norm, dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Transformer encoder trunk: embeddings, stacked self-attention
/// blocks, and mask-aware mean pooling into one vector per sample.
/// This is the part a pretrained checkpoint initializes; the
/// classification head never comes from a checkpoint.
#[derive(Module, Debug)]
pub struct TextEncoder<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

impl<B: Backend> TextEncoder<B> {
    /// input_ids, attention_mask: [batch, seq_len] -> pooled [batch, d_model]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let pad_mask = padding_mask(&attention_mask);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]

        masked_mean(x, attention_mask)
    }
}

/// Attention padding mask: true at positions attention must skip.
///
/// Position 0 is always left attendable. Real rows keep their
/// first token there anyway (padding occupies the suffix), and an
/// all-padding row (empty input text) would otherwise mask every
/// key and push NaN through the attention softmax.
fn padding_mask<B: Backend>(attention_mask: &Tensor<B, 2, Int>) -> Tensor<B, 2, Bool> {
    let [batch_size, _seq_len] = attention_mask.dims();
    let device = attention_mask.device();

    let pad = attention_mask.clone().equal_elem(0).int();
    let pad = pad.slice_assign(
        [0..batch_size, 0..1],
        Tensor::zeros([batch_size, 1], &device),
    );
    pad.equal_elem(1)
}

/// Mean over real token positions only. A row with no real tokens
/// pools to the zero vector (count clamped to 1, all summands 0).
fn masked_mean<B: Backend>(
    hidden:         Tensor<B, 3>,
    attention_mask: Tensor<B, 2, Int>,
) -> Tensor<B, 2> {
    let [batch_size, seq_len, d_model] = hidden.dims();

    let mask = attention_mask.float(); // [batch, seq]
    let weights = mask
        .clone()
        .reshape([batch_size, seq_len, 1])
        .expand([batch_size, seq_len, d_model]);

    let summed = (hidden * weights)
        .sum_dim(1)
        .reshape([batch_size, d_model]);

    let counts = mask
        .sum_dim(1)
        .clamp_min(1.0)
        .expand([batch_size, d_model]);

    summed / counts
}

#[derive(Config, Debug)]
pub struct PiiClassifierConfig {
    pub encoder:    TextEncoderConfig,
    pub num_labels: usize,
}

impl PiiClassifierConfig {
    /// Fresh trunk + fresh head.
    pub fn init<B: Backend>(&self, device: &B::Device) -> PiiClassifier<B> {
        self.head_on(self.encoder.init(device), device)
    }

    /// Fresh classification head of width `num_labels` attached to
    /// an already-initialized (possibly pretrained) trunk.
    pub fn head_on<B: Backend>(
        &self,
        encoder: TextEncoder<B>,
        device:  &B::Device,
    ) -> PiiClassifier<B> {
        let class_head = LinearConfig::new(self.encoder.d_model, self.num_labels).init(device);
        let dropout    = DropoutConfig::new(self.encoder.dropout).init();
        PiiClassifier { encoder, dropout, class_head }
    }
}

/// Multi-label PII classifier: encoder trunk plus a linear head
/// producing one independent logit per category.
#[derive(Module, Debug)]
pub struct PiiClassifier<B: Backend> {
    pub encoder:    TextEncoder<B>,
    pub dropout:    Dropout,
    pub class_head: Linear<B>,
}

impl<B: Backend> PiiClassifier<B> {
    /// input_ids, attention_mask: [batch, seq_len] -> logits [batch, num_labels]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let pooled = self.encoder.forward(input_ids, attention_mask);
        self.class_head.forward(self.dropout.forward(pooled))
    }
}

// --- Encoder presets ---------------------------------------------------------
/// Architecture preset selected by the encoder identifier string.
/// The identifier also decides the vocabulary casing, mirroring
/// the cased/uncased variants the vocabulary file comes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderPreset {
    pub name:      &'static str,
    pub d_model:   usize,
    pub num_heads: usize,
    pub num_layers: usize,
    pub d_ff:      usize,
    pub lowercase: bool,
}

impl EncoderPreset {
    pub fn resolve(identifier: &str) -> Option<Self> {
        match identifier {
            "base-uncased" => Some(Self {
                name: "base-uncased",
                d_model: 256, num_heads: 8, num_layers: 6, d_ff: 1024,
                lowercase: true,
            }),
            "base-cased" => Some(Self {
                name: "base-cased",
                d_model: 256, num_heads: 8, num_layers: 6, d_ff: 1024,
                lowercase: false,
            }),
            "mini-uncased" => Some(Self {
                name: "mini-uncased",
                d_model: 128, num_heads: 4, num_layers: 2, d_ff: 512,
                lowercase: true,
            }),
            _ => None,
        }
    }

    pub fn encoder_config(
        &self,
        vocab_size:  usize,
        max_seq_len: usize,
        dropout:     f64,
    ) -> TextEncoderConfig {
        TextEncoderConfig::new(
            vocab_size, max_seq_len, self.d_model,
            self.num_heads, self.num_layers, self.d_ff, dropout,
        )
    }
}
