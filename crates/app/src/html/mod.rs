//! Landing pages served at `/` by the web variants. Each one only embeds the
//! `/video_feed` stream.

pub const CPU_INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><title>Hailo Pi CPU Inference</title></head>
<body>
    <h1>YOLOv5s CPU Inference</h1>
    <img src="/video_feed" width="640" height="480">
</body>
</html>
"#;

pub const ACCELERATOR_INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><title>Hailo Inference Stream</title></head>
<body>
    <h1>YOLOv5s Hailo-8L Inference</h1>
    <img src="/video_feed" width="640" height="480">
</body>
</html>
"#;
