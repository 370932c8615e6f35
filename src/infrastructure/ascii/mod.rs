//! Image to text rendering for the `ascii` command

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::application::errors::RenderError;
use crate::domain::traits::ImageRenderer;
use crate::infrastructure::config::AsciiConfig;

/// Glyphs from darkest to lightest
const RAMP: &[u8] = b"@%#*+=-:. ";

/// Downloads an image and draws it with characters
pub struct HttpAsciiRenderer {
    client: Client,
    bounds: AsciiConfig,
}

impl HttpAsciiRenderer {
    pub fn new(bounds: AsciiConfig) -> Result<Self, RenderError> {
        Self::with_builder(Client::builder(), bounds)
    }

    fn with_builder(builder: ClientBuilder, bounds: AsciiConfig) -> Result<Self, RenderError> {
        let client = builder
            .timeout(Duration::from_secs(bounds.timeout_secs))
            .build()?;
        Ok(Self { client, bounds })
    }

    /// Download at most `max_bytes`; the timeout covers the whole transfer
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RenderError> {
        let limit = self.bounds.max_bytes;
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(RenderError::TooLarge(limit));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(RenderError::TooLarge(limit));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl ImageRenderer for HttpAsciiRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        // chat clients wrap links as <https://...>
        let url = url.trim_matches(|c| c == '<' || c == '>');
        tracing::debug!("rendering {} as text", url);

        let bytes = self.fetch(url).await?;
        let img = image::load_from_memory(&bytes)?;
        let art = rasterize(&img, self.bounds)?;
        Ok(code_block(&art))
    }
}

/// Grid size for an image, aspect preserved.
///
/// Landscape images fit `max_width` x `max_height` pixels, portrait ones the
/// swapped box. Each text row covers two pixel rows.
pub fn fit(width: u32, height: u32, bounds: AsciiConfig) -> (u32, u32) {
    let ratio = height as f64 / width as f64;
    let (long, short) = (bounds.max_width as f64, bounds.max_height as f64);

    let (mut w, mut h);
    if width > height {
        w = long;
        h = long * ratio;
        if h > short {
            h = short;
            w = short / ratio;
        }
    } else {
        h = long;
        w = long / ratio;
        if w > short {
            w = short;
            h = short * ratio;
        }
    }

    let cols = (w.round() as u32).max(1);
    let rows = ((h / 2.0).ceil() as u32).max(1);
    (cols, rows)
}

/// Draw `img` as lines of glyphs, transparent areas treated as white
pub fn rasterize(img: &DynamicImage, bounds: AsciiConfig) -> Result<String, RenderError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::Empty);
    }

    let (cols, rows) = fit(width, height, bounds);
    let small = img.resize_exact(cols, rows, FilterType::Triangle).to_luma_alpha8();

    let mut lines = Vec::with_capacity(rows as usize);
    for y in 0..rows {
        let line: String = (0..cols)
            .map(|x| {
                let [luma, alpha] = small.get_pixel(x, y).0;
                glyph(over_white(luma, alpha))
            })
            .collect();
        lines.push(line.trim_end().to_string());
    }
    Ok(lines.join("\n"))
}

fn over_white(luma: u8, alpha: u8) -> u8 {
    let ink = (255 - luma as u32) * alpha as u32 / 255;
    (255 - ink) as u8
}

fn glyph(luma: u8) -> char {
    let idx = luma as usize * (RAMP.len() - 1) / 255;
    RAMP[idx] as char
}

/// Fence as a code block; backticks would end it early
pub fn code_block(art: &str) -> String {
    format!("```\n{}\n```", art.replace('`', "'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn bounds() -> AsciiConfig {
        AsciiConfig::default()
    }

    #[test]
    fn test_fit_landscape() {
        assert_eq!(fit(200, 100, bounds()), (100, 25));
        // too flat to reach the height bound
        assert_eq!(fit(1000, 10, bounds()), (100, 1));
        // height bound wins for mildly wide images
        assert_eq!(fit(110, 100, bounds()), (77, 35));
    }

    #[test]
    fn test_fit_portrait_and_square() {
        assert_eq!(fit(100, 400, bounds()), (25, 50));
        assert_eq!(fit(50, 50, bounds()), (70, 35));
    }

    #[test]
    fn test_ramp_ends() {
        assert_eq!(glyph(0), '@');
        assert_eq!(glyph(255), ' ');
        assert_eq!(over_white(0, 0), 255);
        assert_eq!(over_white(0, 255), 0);
    }

    #[test]
    fn test_rasterize_solid_images() {
        let black = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 255])));
        let art = rasterize(&black, bounds()).unwrap();
        let lines: Vec<&str> = art.lines().collect();
        assert_eq!(lines.len(), 25);
        assert!(lines.iter().all(|l| l.len() == 100 && l.chars().all(|c| c == '@')));

        let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 0])));
        let art = rasterize(&clear, bounds()).unwrap();
        assert!(art.lines().all(str::is_empty));
    }

    #[test]
    fn test_empty_image_is_refused() {
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(matches!(rasterize(&empty, bounds()), Err(RenderError::Empty)));
    }

    #[test]
    fn test_code_block_neutralizes_backticks() {
        assert_eq!(code_block("a`b"), "```\na'b\n```");
    }

    fn local_renderer(timeout_secs: u64, max_bytes: u64) -> HttpAsciiRenderer {
        let bounds = AsciiConfig {
            timeout_secs,
            max_bytes,
            ..AsciiConfig::default()
        };
        HttpAsciiRenderer::with_builder(Client::builder().no_proxy(), bounds).unwrap()
    }

    /// Serves `head` followed by `body_len` bytes to every connection
    async fn serve(head: &'static str, body_len: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&vec![b'x'; body_len]).await;
            }
        });
        format!("http://{}/cat.png", addr)
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // accept and never answer
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let renderer = local_renderer(1, 1024);
        let url = format!("<http://{}/cat.png>", addr);
        let result = tokio::time::timeout(Duration::from_secs(10), renderer.render(&url))
            .await
            .expect("render should give up on its own");
        assert!(matches!(result, Err(RenderError::Fetch(ref e)) if e.is_timeout()), "{:?}", result);
    }

    #[tokio::test]
    async fn test_oversized_download_is_refused() {
        let renderer = local_renderer(5, 1024);

        let declared = serve("HTTP/1.1 200 OK\r\nContent-Length: 4096\r\n\r\n", 4096).await;
        let result = renderer.render(&declared).await;
        assert!(matches!(result, Err(RenderError::TooLarge(1024))), "{:?}", result);

        // no length header, so the cap applies while streaming
        let streamed = serve("HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n", 4096).await;
        let result = renderer.render(&streamed).await;
        assert!(matches!(result, Err(RenderError::TooLarge(1024))), "{:?}", result);
    }
}
