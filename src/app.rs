//! Main application window: upload, preview, and export actions

use std::path::{Path, PathBuf};

use cosmic::iced_futures::{Subscription, event::listen_with};
use cosmic::{Task, app};

use crate::config::EquatexConfig;
use crate::emit::{self, ExportFormat, TexCompiler};
use crate::fl;
use crate::loader::SourceImage;
use crate::ocr::{LatexOcr, Pix2TexCli};

pub(crate) fn run() -> cosmic::iced::Result {
    let settings = cosmic::app::Settings::default().size(cosmic::iced::Size::new(650.0, 700.0));
    cosmic::app::run::<App>(settings, ())
}

pub struct App {
    pub core: app::Core,
    pub config: EquatexConfig,
    /// Currently loaded equation image; replaced on the next upload
    pub image: Option<SourceImage>,
    /// Pending modal notification, shown until dismissed
    pub notice: Option<Notice>,
}

/// Outcome of an upload or export attempt, rendered as a modal dialog.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub enum Msg {
    /// Open the file picker
    UploadPressed,
    /// An image path arrived via picker or drag-and-drop
    ImageDropped(PathBuf),
    /// Run recognition and emit a document in the chosen format
    Export(ExportFormat),
    /// Close the outcome dialog
    DismissNotice,
}

impl App {
    fn load_image(&mut self, path: &Path) {
        match SourceImage::load(path) {
            Ok(image) => {
                self.image = Some(image);
            }
            Err(err) => {
                log::warn!("Upload failed: {:?}", err);
                self.notice = Some(Notice {
                    title: fl!("error-title"),
                    body: fl!("upload-failed", error = format!("{:#}", err)),
                });
            }
        }
    }
}

impl cosmic::Application for App {
    type Executor = cosmic::executor::Default;

    type Flags = ();

    type Message = Msg;

    const APP_ID: &'static str = "io.github.equatex.equatex";

    fn core(&self) -> &app::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut app::Core {
        &mut self.core
    }

    fn init(
        core: app::Core,
        _flags: Self::Flags,
    ) -> (Self, cosmic::iced::Task<cosmic::Action<Self::Message>>) {
        (
            Self {
                core,
                config: EquatexConfig::load(),
                image: None,
                notice: None,
            },
            cosmic::iced::Task::none(),
        )
    }

    fn view(&self) -> cosmic::Element<'_, Self::Message> {
        use cosmic::iced::Length;
        use cosmic::iced_core::alignment::{Horizontal, Vertical};
        use cosmic::iced_widget::{column, row};
        use cosmic::widget::{button, container, text};

        let preview: cosmic::Element<'_, Msg> = match &self.image {
            Some(image) => {
                let (width, height) = image.preview_size();
                cosmic::widget::image(image.handle.clone())
                    .width(Length::Fixed(width as f32))
                    .height(Length::Fixed(height as f32))
                    .into()
            }
            None => text::body(fl!("drop-hint")).into(),
        };

        let preview_pane = container(preview)
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(Horizontal::Center)
            .align_y(Vertical::Center);

        let can_export = self.image.is_some();
        let controls = row![
            button::suggested(fl!("upload-image")).on_press(Msg::UploadPressed),
            button::standard(fl!("export-docx"))
                .on_press_maybe(can_export.then_some(Msg::Export(ExportFormat::Docx))),
            button::standard(fl!("export-pdf"))
                .on_press_maybe(can_export.then_some(Msg::Export(ExportFormat::Pdf))),
        ]
        .spacing(8);

        column![
            container(text::title3(fl!("app-title")))
                .width(Length::Fill)
                .align_x(Horizontal::Center),
            preview_pane,
            container(controls)
                .width(Length::Fill)
                .align_x(Horizontal::Center),
        ]
        .spacing(15)
        .padding(20)
        .into()
    }

    fn dialog(&self) -> Option<cosmic::Element<'_, Self::Message>> {
        let notice = self.notice.as_ref()?;
        Some(
            cosmic::widget::dialog()
                .title(notice.title.clone())
                .body(notice.body.clone())
                .primary_action(
                    cosmic::widget::button::suggested(fl!("ok")).on_press(Msg::DismissNotice),
                )
                .into(),
        )
    }

    fn update(
        &mut self,
        message: Self::Message,
    ) -> cosmic::iced::Task<cosmic::Action<Self::Message>> {
        match message {
            Msg::UploadPressed => {
                let picked = rfd::FileDialog::new()
                    .set_title(&fl!("select-image"))
                    .add_filter(&fl!("image-filter"), &["png", "jpg", "jpeg"])
                    .pick_file();
                if let Some(path) = picked {
                    self.load_image(&path);
                }
                Task::none()
            }
            Msg::ImageDropped(path) => {
                self.load_image(&path);
                Task::none()
            }
            Msg::Export(format) => {
                if let Some(image) = &self.image {
                    let ocr = Pix2TexCli::new(&self.config.pix2tex_command);
                    let compiler = emit::compiler_for(format, &self.config);
                    let output = self.config.output_path(format);

                    // Deliberately blocking: one export in flight, the
                    // interface waits until it finishes.
                    self.notice = Some(
                        match run_export(image, &ocr, compiler.as_ref(), &output) {
                            Ok(latex) => Notice {
                                title: fl!("success-title"),
                                body: fl!(
                                    "export-success",
                                    path = output.display().to_string(),
                                    latex = latex
                                ),
                            },
                            Err(err) => {
                                log::error!("Export failed: {:?}", err);
                                Notice {
                                    title: fl!("error-title"),
                                    body: fl!("export-failed", error = format!("{:#}", err)),
                                }
                            }
                        },
                    );
                }
                Task::none()
            }
            Msg::DismissNotice => {
                self.notice = None;
                Task::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Self::Message> {
        listen_with(|event, _, _| match event {
            cosmic::iced_core::Event::Window(cosmic::iced_core::window::Event::FileDropped(
                path,
            )) => Some(Msg::ImageDropped(path)),
            _ => None,
        })
    }
}

/// Recognize the loaded image and emit a document at `output`.
///
/// Returns the extracted LaTeX for the success notification. Any failure
/// from recognition, templating, or conversion aborts the attempt and
/// leaves a previously exported artifact untouched.
pub fn run_export(
    image: &SourceImage,
    ocr: &dyn LatexOcr,
    compiler: &dyn TexCompiler,
    output: &Path,
) -> anyhow::Result<String> {
    let latex = ocr.recognize(&image.inference_image())?.trim().to_string();
    emit::export(&latex, compiler, output)?;
    Ok(latex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    struct StubOcr(&'static str);

    impl LatexOcr for StubOcr {
        fn recognize(&self, _image: &image::RgbImage) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingOcr;

    impl LatexOcr for FailingOcr {
        fn recognize(&self, _image: &image::RgbImage) -> anyhow::Result<String> {
            anyhow::bail!("model not available")
        }
    }

    struct StubCompiler;

    impl TexCompiler for StubCompiler {
        fn compile(&self, source: &Path, scratch: &Path) -> anyhow::Result<PathBuf> {
            let rendered = std::fs::read_to_string(source)?;
            let artifact = scratch.join("equation.pdf");
            std::fs::write(&artifact, rendered)?;
            Ok(artifact)
        }
    }

    fn test_image() -> SourceImage {
        let rgba = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let handle =
            cosmic::widget::image::Handle::from_rgba(4, 4, rgba.clone().into_vec());
        SourceImage {
            path: PathBuf::from("eq.png"),
            rgba,
            handle,
        }
    }

    #[test]
    fn test_run_export_trims_recognized_markup() {
        let out = tempfile::tempdir().unwrap();
        let output = out.path().join("output_equation.pdf");

        let latex =
            run_export(&test_image(), &StubOcr("  e = mc^2  "), &StubCompiler, &output).unwrap();

        assert_eq!(latex, "e = mc^2");
        let rendered = std::fs::read_to_string(&output).unwrap();
        assert!(rendered.contains("\\[\ne = mc^2\n\\]"));
    }

    #[test]
    fn test_run_export_empty_markup_still_produces_document() {
        let out = tempfile::tempdir().unwrap();
        let output = out.path().join("output_equation.docx");

        let latex = run_export(&test_image(), &StubOcr(""), &StubCompiler, &output).unwrap();

        assert_eq!(latex, "");
        let rendered = std::fs::read_to_string(&output).unwrap();
        assert!(rendered.contains("\\[\n\n\\]"));
    }

    #[test]
    fn test_run_export_recognition_failure_leaves_artifact() {
        let out = tempfile::tempdir().unwrap();
        let output = out.path().join("output_equation.pdf");
        std::fs::write(&output, b"previous export").unwrap();

        let err = run_export(&test_image(), &FailingOcr, &StubCompiler, &output).unwrap_err();

        assert!(err.to_string().contains("model not available"));
        assert_eq!(std::fs::read(&output).unwrap(), b"previous export");
    }
}
